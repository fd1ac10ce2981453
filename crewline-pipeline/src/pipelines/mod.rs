pub mod staffing_benchmark;
