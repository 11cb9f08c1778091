pub mod threaded_tracker;
