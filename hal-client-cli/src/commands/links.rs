use crate::error::CliResult;
use crate::output;
use hal_client::HalClient;

pub fn run(client: &HalClient, url: &str) -> CliResult<()> {
    let links = client.get(url)?.links()?;
    if links.is_empty() {
        println!("(no links)");
        return Ok(());
    }
    println!("{}", output::format_links_table(&links));
    Ok(())
}
