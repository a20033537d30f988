use loadline::error::AppResult;

fn main() -> AppResult<()> {
    loadline::entry::run()
}
