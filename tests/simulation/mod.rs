mod common;
mod cost;
mod pipeline;
mod properties;
