fn main() -> Result<(), Box<dyn std::error::Error>> {
    #[cfg(feature = "generate")]
    tonic_build::configure()
        .out_dir("src")
        .compile_protos(&["proto/inventory.proto"], &["proto"])?;
    Ok(())
}
