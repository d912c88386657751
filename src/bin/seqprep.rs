use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    seqprep::cli::run_prepare(std::env::args().skip(1))
}
