mod dump;
mod ls;
mod show;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init_from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "warn"),
    );
    let args: Vec<_> = std::env::args().skip(1).collect();
    let ret = match args.first().map(AsRef::as_ref) {
        Some("ls") => ls::entry_point(args),
        Some("show") | Some("view") => show::entry_point(args),
        Some("dump") => dump::entry_point(args),
        _ => {
            eprintln!(
                "Genomat Utilities Program {} (genomat library version: {})",
                genomat_tools::VERSION,
                genomat::VERSION
            );
            eprintln!("Usage: genomat-tools <subcommand> <args>");
            eprintln!("Possible subcommands are:");
            eprintln!("\tls  \tList the matrices and operations of a study");
            eprintln!("\tshow\tPrint the contents of a dataset");
            eprintln!("\tdump\tDump the container table of contents");
            eprintln!("\tview\tSame as show");
            eprintln!();
            eprintln!("Type 'genomat-tools <subcommand> --help' to learn more about each subcommands.");
            Ok(())
        }
    };

    if let Some(io_error) = ret
        .as_ref()
        .err()
        .and_then(|e| e.downcast_ref::<std::io::Error>())
    {
        if io_error.kind() == std::io::ErrorKind::BrokenPipe {
            return Ok(());
        }
    }
    ret
}
