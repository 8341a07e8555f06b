use crate::error::CliResult;
use hal_client::HalClient;

pub fn run(client: &HalClient, url: &str, limit: Option<usize>) -> CliResult<()> {
    let collection = client.get(url)?.into_collection()?;
    for item in collection.iter().take(limit.unwrap_or(usize::MAX)) {
        println!("{}", item?.location());
    }
    Ok(())
}
