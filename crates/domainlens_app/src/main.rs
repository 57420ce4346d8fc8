mod platform;

fn main() {
    platform::logging::initialize(platform::logging::LogDestination::File);
    if let Err(error) = platform::run_app() {
        eprintln!("domainlens: {error}");
        std::process::exit(1);
    }
}
