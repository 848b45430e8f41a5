// SPDX-FileCopyrightText: 2026 The tfs-gateway Authors
// SPDX-License-Identifier: Apache-2.0

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let proto_dir = "proto";

    // Servers are generated too so the tests can host a stub backend
    // in-process.
    tonic_build::configure()
        .build_server(true)
        .compile_protos(
            &[
                format!("{proto_dir}/prediction_service.proto"),
                format!("{proto_dir}/model_service.proto"),
            ],
            &[proto_dir],
        )?;

    // Re-run if any proto files change.
    println!("cargo:rerun-if-changed={proto_dir}");

    Ok(())
}
