fn main() {
    // write build time info, consumed by the reporting module
    built::write_built_file().expect("Failed to acquire build-time information");
}
