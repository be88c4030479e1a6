/// The flow of the processor: the engine replays the sorted game stream,
/// calling the rater and the meta tracker per game and the combiner per
/// row; the snapshot, ranking and evaluation modules read the finished
/// history.
pub mod combiner;
pub mod constants;
pub mod engine;
pub mod evaluation;
pub mod ewma;
pub mod history;
pub mod meta;
pub mod ranking;
pub mod rater;
pub mod snapshot;
pub mod structures;
