//! Integration tests: apply passes against real stores and full workflow runs

mod apply_pass;
mod process_message;
mod support;
