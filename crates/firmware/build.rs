use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    // The linker script is only needed for the board binary.
    #[cfg(feature = "hardware")]
    {
        use std::path::PathBuf;

        let out = PathBuf::from(std::env::var_os("OUT_DIR").ok_or("OUT_DIR not set")?);
        std::fs::write(out.join("memory.x"), include_bytes!("../../memory.x"))?;
        println!("cargo:rustc-link-search={}", out.display());
        println!("cargo:rerun-if-changed=../../memory.x");
    }

    println!("cargo:rerun-if-changed=build.rs");
    Ok(())
}
