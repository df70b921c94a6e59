/// Build script for the LoRaWAN relay management service.
///
/// Compiles the protocol buffer definitions into the gRPC client/server
/// code and emits a serialized file descriptor set used by the server
/// reflection service.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let out_dir = std::path::PathBuf::from(std::env::var("OUT_DIR")?);

    tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .file_descriptor_set_path(out_dir.join("relay_descriptor.bin"))
        .compile_protos(&["proto/relay.proto"], &["proto"])?;

    println!("cargo:rerun-if-changed=proto/relay.proto");
    println!("cargo:rerun-if-changed=proto/google/api/annotations.proto");
    println!("cargo:rerun-if-changed=proto/google/api/http.proto");
    Ok(())
}
