#![allow(dead_code)]

pub mod architecture;
pub mod http;
pub mod stack;
