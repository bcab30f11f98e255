//! Example bindings, as the binding generator would emit them.

pub mod keybase1;
