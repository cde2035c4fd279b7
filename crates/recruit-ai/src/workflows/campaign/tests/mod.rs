mod common;
mod scheduler;
mod service;
