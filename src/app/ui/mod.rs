mod controls;
mod details;
mod panels;
mod source;
mod toasts;
mod triage;

pub(in crate::app) use toasts::{ToastLevel, Toasts};
