// Input side-channel: pointer position and modifier state sampled during a drag.

pub mod pointer;

pub use pointer::{Modifiers, PointerSample, PointerTracker};
