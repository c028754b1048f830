fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    // Shown by `pastekit --version`
    let build_date = chrono::Utc::now().format("%Y-%m-%d").to_string();
    println!("cargo:rustc-env=PASTEKIT_BUILD_DATE={}", build_date);
}
