pub mod boost;
