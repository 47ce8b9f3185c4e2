use std::process;

use clap::{crate_authors, crate_name, crate_version, Arg, Command, ValueHint};

use xtask::{check, manifests};

fn main() {
    let cmd = Command::new(crate_name!())
        .author(crate_authors!())
        .version(crate_version!())
        .about("Build + task support for kubescout")
        .subcommand_required(true)
        .subcommands([
            Command::new("check").about("run the read-only-core static check (Testable Property 11)"),
            Command::new("manifests").about("render the foreign Flux/Argo CRDs into config/crd for local KinD testing").arg(
                Arg::new("out_dir")
                    .long("out_dir")
                    .value_name("DIR")
                    .help("manifest output directory")
                    .long_help("Manifest output directory. If unspecified, \"config/crd\" inside the workspace root is used.")
                    .value_hint(ValueHint::DirPath),
            ),
        ]);

    let result = match cmd.get_matches().subcommand() {
        Some(("check", _)) => check::readonly_core(),
        Some(("manifests", m)) => manifests::command(manifests::ManifestsOpts::from(m)),
        _ => unreachable!("clap requires a subcommand"),
    };

    if let Err(e) = result {
        eprintln!("{e}");
        process::exit(1);
    }
}
