use volley::error::AppResult;

fn main() -> AppResult<()> {
    volley::entry::run()
}
