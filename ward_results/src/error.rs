use chrono::NaiveDate;
use snafu::Snafu;

/// The classes of failures that stop the processing of a document.
///
/// None of them is recovered from automatically: the fix is either a change in
/// the extraction, or a new entry in the overrides.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum ErrorKind {
    /// The shape of a table does not match the known layout.
    Schema,
    /// A precinct lacks one of the ballots cast / votes cast / blanks / all others rows.
    MissingField,
    /// The vote counts of a precinct do not add up.
    ArithmeticInvariant,
    DistrictUnresolved,
    DateUnresolved,
    /// The races of an election cannot be given a title.
    Grouping,
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum PipelineError {
    #[snafu(display("table {table}: the table has no rows"))]
    EmptyTable { table: usize },

    #[snafu(display("table {table}: missing column {column:?}"))]
    MissingColumn { table: usize, column: String },

    #[snafu(display(
        "table {table}: candidate {candidate:?} in precinct {precinct:?} has non-numeric votes {content:?}"
    ))]
    NonNumericVotes {
        table: usize,
        candidate: String,
        precinct: String,
        content: String,
    },

    #[snafu(display(
        "table {table}: merged cells of {candidate:?} hold {found} values for {expected} precincts"
    ))]
    MergedCellMismatch {
        table: usize,
        candidate: String,
        expected: usize,
        found: usize,
    },

    #[snafu(display("table {table}: candidate {candidate:?} appears twice in precinct {precinct:?}"))]
    DuplicateRow {
        table: usize,
        candidate: String,
        precinct: String,
    },

    #[snafu(display("the document has no ward summary table"))]
    MissingSummary {},

    #[snafu(display("ward summary header cell {content:?} is not a ward number"))]
    BadWardNumber { content: String },

    #[snafu(display("{wards} wards listed in the summary table, but {tables} ward tables found"))]
    WardCountMismatch { wards: usize, tables: usize },

    #[snafu(display("ward {ward} precinct {precinct}: missing the {field:?} row"))]
    MissingField {
        ward: u32,
        precinct: String,
        field: &'static str,
    },

    #[snafu(display(
        "ward {ward} precinct {precinct}: {votes_cast} votes cast, but the candidates have {candidate_votes} votes and all others {all_others}"
    ))]
    VoteSumMismatch {
        ward: u32,
        precinct: String,
        votes_cast: u64,
        candidate_votes: u64,
        all_others: u64,
    },

    #[snafu(display(
        "ward {ward} precinct {precinct}: candidates {found:?} differ from the other precincts {expected:?}"
    ))]
    CandidateSetMismatch {
        ward: u32,
        precinct: String,
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[snafu(display("ward {ward}: precinct {precinct:?} has no number to be ordered by"))]
    UnorderablePrecinct { ward: u32, precinct: String },

    #[snafu(display(
        "no district in {election_label:?} / {link_label:?}: add a district override for this pair"
    ))]
    DistrictUnresolved {
        election_label: String,
        link_label: String,
    },

    #[snafu(display("cannot read a date from the election label {election_label:?}"))]
    DateUnresolved {
        election_label: String,
        source: chrono::ParseError,
    },

    #[snafu(display("the special election of {date} has {races} races, expected exactly one"))]
    SpecialElectionRaces { date: NaiveDate, races: usize },
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::MissingField { .. } => ErrorKind::MissingField,
            PipelineError::VoteSumMismatch { .. } => ErrorKind::ArithmeticInvariant,
            PipelineError::DistrictUnresolved { .. } => ErrorKind::DistrictUnresolved,
            PipelineError::DateUnresolved { .. } => ErrorKind::DateUnresolved,
            PipelineError::SpecialElectionRaces { .. } => ErrorKind::Grouping,
            _ => ErrorKind::Schema,
        }
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;
