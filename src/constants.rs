// Raw price columns every input file must provide
pub const PRICE_COLUMNS: [&str; 5] = ["open", "high", "low", "close", "volume"];

// Row key column after name standardization
pub const DATE_COLUMN: &str = "date";

// Derived columns
pub const RETURN_COLUMN: &str = "close_return";
pub const LABEL_COLUMN: &str = "label";

// Model inputs, in matrix column order
pub const FEATURE_COLUMNS: [&str; 6] = [
    "open",
    "high",
    "low",
    "close",
    "volume",
    "close_return",
];

// Date boundaries (inclusive). Training must end before testing starts.
pub const TRAIN_START_DATE: &str = "2015-01-01";
pub const TRAIN_END_DATE: &str = "2021-12-31";
pub const TEST_START_DATE: &str = "2022-01-01";
pub const TEST_END_DATE: &str = "2023-12-31";

// Booster hyperparameters (fixed, not tuned)
pub const MAX_TREE_DEPTH: usize = 5;
pub const LEARNING_RATE: f64 = 0.1;
pub const NUM_BOOST_ROUNDS: usize = 100;
pub const L2_REGULARIZATION: f64 = 1.0;
pub const MIN_SPLIT_LOSS: f64 = 0.0;
pub const MIN_CHILD_WEIGHT: f64 = 1.0;
pub const BASE_SCORE: f64 = 0.5;

// Scores at or above this value are classified as label 1
pub const PREDICTION_THRESHOLD: f64 = 0.5;

// File locations
pub const DEFAULT_INPUT_FILE: &str = "data/AAPL_daily_ohlcv.csv";
pub const LABELED_FILE_SUFFIX: &str = "_labeled";
pub const EXPERIMENT_DIR: &str = "experiments";
