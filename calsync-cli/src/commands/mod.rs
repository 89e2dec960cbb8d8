pub mod clear;
pub mod events;
pub mod new;
pub mod search;
