//! Follow-up commands printed for the operator after a deployment.

use alloy_core::primitives::Address;

/// Name of the CLI the printed commands invoke.
const CLI_NAME: &str = "revealkit";

pub const SEPARATOR: &str = "----------------------------------------------------";

/// How to fund a freshly deployed consumer with LINK and request a random number from it.
pub fn consumer_instructions(
    consumer: Address,
    network: &str,
    link_address: Option<Address>,
) -> Vec<String> {
    let link_flag = link_address
        .map(|link| format!(" --link-address {}", link))
        .unwrap_or_default();

    vec![
        "Run the following command to fund contract with LINK:".to_string(),
        format!(
            "{} fund-link --contract {} --network {}{}",
            CLI_NAME, consumer, network, link_flag
        ),
        "Then run RandomNumberConsumer contract with the following command".to_string(),
        format!(
            "{} request-random-number --contract {} --network {}",
            CLI_NAME, consumer, network
        ),
        SEPARATOR.to_string(),
    ]
}

/// Print instruction lines to stdout.
pub fn print(lines: &[String]) {
    for line in lines {
        println!("{}", line);
    }
}
