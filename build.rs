fn main() {
    // Rebuild when the UI changes
    println!("cargo:rerun-if-changed=ui/app.slint");

    slint_build::compile("ui/app.slint").expect("slint-build: compiling .slint failed");
}
