use clap::{Arg, Command};
use genomat::{DatasetRepository, StorageConfig, StudyId};
use genomat_tools::AppResult;

pub fn entry_point(args: Vec<String>) -> AppResult<()> {
    let matches = Command::new("ls")
        .about("List the matrices and operations of a study")
        .arg(
            Arg::new("data-dir")
                .required(true)
                .help("The data directory of the dataset store"),
        )
        .arg(
            Arg::new("study")
                .long("study")
                .default_value("0")
                .help("Numeric identifier of the study to list"),
        )
        .get_matches_from(args);

    let data_dir = matches.get_one::<String>("data-dir").unwrap();
    let study = StudyId(matches.get_one::<String>("study").unwrap().parse()?);

    let repo = DatasetRepository::open(StorageConfig::new(data_dir));
    for matrix in repo.list_matrices(study)? {
        println!(
            "matrix {}\t{}\t{} markers x {} samples\t{}",
            matrix.key.matrix.0,
            matrix.friendly_name,
            matrix.num_markers,
            matrix.num_samples,
            matrix.technology
        );
        for op in repo.operations_of(matrix.key)? {
            println!(
                "\toperation {}\t{}\t{} markers x {} samples\t{}",
                op.key.operation.0,
                op.operation_type,
                op.num_markers,
                op.num_samples,
                if op.in_memory { "memory" } else { "file" }
            );
        }
    }
    Ok(())
}
