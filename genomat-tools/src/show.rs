use clap::{Arg, ArgAction, Command};
use genomat::{
    DataSetKey, DatasetRepository, MatrixId, MatrixKey, OperationId, OperationKey, StorageConfig,
    StudyId,
};
use genomat_tools::AppResult;
use log::debug;
use std::io::{BufWriter, Write};

pub fn entry_point(args: Vec<String>) -> AppResult<()> {
    let matches = Command::new("show")
        .about("Print the contents of a dataset as tab separated text")
        .arg(
            Arg::new("data-dir")
                .required(true)
                .help("The data directory of the dataset store"),
        )
        .arg(
            Arg::new("matrix")
                .required(true)
                .help("Numeric identifier of the matrix"),
        )
        .arg(
            Arg::new("study")
                .long("study")
                .default_value("0")
                .help("Numeric identifier of the study"),
        )
        .arg(
            Arg::new("operation")
                .long("operation")
                .help("Show this operation result instead of the matrix itself"),
        )
        .arg(
            Arg::new("markers")
                .long("markers")
                .action(ArgAction::SetTrue)
                .help("Print the marker annotations instead of the genotypes"),
        )
        .get_matches_from(args);

    let data_dir = matches.get_one::<String>("data-dir").unwrap();
    let matrix = MatrixKey {
        study: StudyId(matches.get_one::<String>("study").unwrap().parse()?),
        matrix: MatrixId(matches.get_one::<String>("matrix").unwrap().parse()?),
    };
    let key = match matches.get_one::<String>("operation") {
        Some(id) => DataSetKey::Operation(OperationKey {
            matrix,
            operation: OperationId(id.parse()?),
            parent_operation: None,
        }),
        None => DataSetKey::Matrix(matrix),
    };

    let repo = DatasetRepository::open(StorageConfig::new(data_dir));
    debug!("resolving dataset {}", key);
    let mut source = repo.open_dataset_source(key)?;
    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    if matches.get_flag("markers") {
        writeln!(out, "marker\trs_id\tchromosome\tposition")?;
        for record in source.markers_records()? {
            writeln!(
                out,
                "{}\t{}\t{}\t{}",
                record.key, record.rs_id, record.chromosome, record.position
            )?;
        }
        return Ok(());
    }

    let markers = source.markers_keys()?;
    let samples = source.samples_keys()?;
    let mut rows = source.samples_genotypes()?;

    write!(out, "family/sample")?;
    for key in markers.keys() {
        write!(out, "\t{}", key)?;
    }
    writeln!(out)?;
    for (row, (_, sample)) in samples.iter().enumerate() {
        write!(out, "{}", sample)?;
        for genotype in rows.get(row)? {
            write!(out, "\t{}", genotype)?;
        }
        writeln!(out)?;
    }
    Ok(())
}
