use clap::Parser;

/// This is a scraper for ward and precinct election results.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The JSON file with the override tables and the extractor settings.
    /// When not provided, the built-in configuration for the Boston results is used.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path, optional) A JSON list of documents ({electionLabel, linkLabel, url}) to process
    /// instead of crawling the results index page.
    #[clap(short, long, value_parser)]
    pub manifest: Option<String>,

    /// (directory, default 'data') Where the election files are written.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (directory, default 'cache') Where the results of the index crawl and of the table
    /// extraction are cached between runs.
    #[clap(long, value_parser)]
    pub cache_dir: Option<String>,

    /// If passed as an argument, the cache is neither read nor written.
    #[clap(long, takes_value = false)]
    pub no_cache: bool,

    /// (file path) A reference file containing all the elections in JSON format. If provided,
    /// the scraped elections are checked against it.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// If passed as an argument, the elections are written even when some documents failed.
    /// The failures are still reported.
    #[clap(long, takes_value = false)]
    pub allow_failures: bool,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
