fn main() {
    // Exposes package and toolchain versions to `direction_boost::build_info`
    built::write_built_file().expect("Failed to generate build info");
}
