fn main() {
    // Version resources only make sense (and only build) for Windows targets.
    if std::env::var("CARGO_CFG_TARGET_OS").as_deref() != Ok("windows") {
        return;
    }

    let mut res = winres::WindowsResource::new();
    res.set("ProductName", "OLED Sentinel")
        .set("FileDescription", "OLED Sentinel - idle display blanking");
    if let Err(e) = res.compile() {
        println!("cargo:warning=failed to embed Windows resources: {e}");
    }
}
