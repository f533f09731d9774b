pub mod constants;
pub mod daily;
pub mod error;
#[cfg(test)]
pub mod test;
pub mod util {
    pub mod feature_engineering;
    pub mod file_utils;
    pub mod model_logger;
    pub mod pre_processor;
    #[cfg(test)]
    pub mod test_utils;
}

/// Package and toolchain versions generated by `build.rs`
pub mod build_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}
