mod common;

mod ranking;
