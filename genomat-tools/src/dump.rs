use clap::{Arg, Command};
use genomat_arrayfile::ArrayFileReader;
use genomat_tools::AppResult;

pub fn entry_point(args: Vec<String>) -> AppResult<()> {
    let matches = Command::new("dump")
        .about("Dump the table of contents of a container file")
        .arg(Arg::new("input").required(true).help("The container file"))
        .get_matches_from(args);

    let input = matches.get_one::<String>("input").unwrap();
    let reader = ArrayFileReader::open_file(input)?;
    let toc = reader.toc();

    println!("{:24}\t{:>10}", "Dimension", "Size");
    for dim in &toc.dimensions {
        println!("{:24}\t{:>10}", dim.name, dim.size);
    }
    println!();
    println!("{:24}\t{}", "Attribute", "Value");
    for (name, value) in &toc.attributes {
        println!("{:24}\t{}", name, value);
    }
    println!();
    println!(
        "{:24}\t{:12}\t{:12}\t{:>10}\t{:>10}",
        "Variable", "Type", "Shape", "Offset", "Size"
    );
    for var in &toc.variables {
        let shape = var
            .shape
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join("x");
        println!(
            "{:24}\t{:12}\t{:12}\t{:>10}\t{:>10}",
            var.name,
            format!("{:?}", var.element),
            shape,
            var.offset,
            var.size
        );
    }
    Ok(())
}
