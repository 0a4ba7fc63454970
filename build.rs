use std::path::Path;

const PROTO_DIR: &str = "proto";
const SRC: [&str; 1] = ["proto/tensorboard.proto"];

fn main() {
    for src in SRC {
        assert!(Path::new(src).exists(), "missing proto source {src}");
        println!("cargo:rerun-if-changed={}", src);
    }

    protobuf_codegen::Codegen::new()
        .pure()
        .includes([PROTO_DIR])
        .inputs(SRC)
        .cargo_out_dir("protos")
        .run_from_script();
}
