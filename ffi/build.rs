use std::env;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-changed=src/lib.rs");
    println!("cargo:rerun-if-changed=src/types.rs");
    println!("cargo:rerun-if-changed=cbindgen.toml");

    let crate_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(_) => return,
    };
    let config = cbindgen::Config::from_root_or_default(&crate_dir);
    let header = crate_dir.join("include").join("blockpost.h");

    match cbindgen::Builder::new()
        .with_crate(&crate_dir)
        .with_config(config)
        .generate()
    {
        Ok(bindings) => {
            if let Some(dir) = header.parent() {
                if let Err(err) = std::fs::create_dir_all(dir) {
                    println!("cargo:warning=cannot create {}, header not regenerated: {err}", dir.display());
                    return;
                }
            }
            bindings.write_to_file(&header);
        }
        Err(err) => println!("cargo:warning=cbindgen failed, header not regenerated: {err}"),
    }
}
