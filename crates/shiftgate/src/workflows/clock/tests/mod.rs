mod backends;
mod common;
