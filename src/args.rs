use clap::Parser;

/// This is a tabulation program for multi-criteria group project selection.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The file describing the selection round in JSON format: the candidate
    /// projects, the evaluation fields with their weighted criteria, and the score files to
    /// read. For more information about the file format, read the documentation.
    #[clap(short, long, value_parser)]
    pub config: String,

    /// (file path) A reference file containing the summary of a selection round in JSON
    /// format. If provided, prosel will check that the tabulated output matches the
    /// reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary of the selection round will
    /// be written in JSON format to the given location.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
