mod cache_tests;
mod listing_tests;
mod pipeline_tests;
mod session_tests;
