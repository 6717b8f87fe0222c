use ethers::types::U256;
use ethers::utils::{format_ether, parse_ether};

use kitten_relay::{config::Config, services::onchain::OnchainInvoker};

fn owner_key() -> Result<String, String> {
    std::env::var("OWNER_PRIVATE_KEY")
        .ok()
        .filter(|key| !key.trim().is_empty())
        .or_else(|| {
            std::env::var("GAME_PRIVATE_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty())
        })
        .ok_or_else(|| "OWNER_PRIVATE_KEY (or GAME_PRIVATE_KEY) is not set".to_string())
}

fn parse_amount(raw: &str) -> Result<U256, String> {
    let amount = parse_ether(raw.trim()).map_err(|e| format!("invalid amount {raw:?}: {e}"))?;
    if amount.is_zero() {
        return Err("amount must be greater than zero".to_string());
    }
    Ok(amount)
}

async fn run(amount_raw: &str) -> anyhow::Result<()> {
    let config = Config::from_env()?;
    config.validate()?;
    let amount = parse_amount(amount_raw).map_err(anyhow::Error::msg)?;
    let key = owner_key().map_err(anyhow::Error::msg)?;

    let invoker = OnchainInvoker::from_private_key(&config, &key)?;
    let chain_id = invoker.chain_id().await?;
    if chain_id != config.chain_id {
        anyhow::bail!(
            "RPC is on chain {} but CHAIN_ID is {}",
            chain_id,
            config.chain_id
        );
    }

    let owner = invoker.owner().await?;
    let signer = invoker.signer_address();
    if owner != signer {
        anyhow::bail!("signer {:#x} is not the contract owner {:#x}", signer, owner);
    }

    let balance = invoker.balance().await?;
    println!("Owner balance: {} ETH", format_ether(balance));
    if balance < amount {
        anyhow::bail!("owner balance is below {} ETH", format_ether(amount));
    }

    let tx_hash = invoker
        .fund_contract(amount, config.confirmations)
        .await?;
    println!(
        "Funded {} with {} ETH: {:#x}",
        config.kitten_contract_address,
        format_ether(amount),
        tx_hash
    );
    Ok(())
}

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!("usage: fund-contract <amount-eth>");
        std::process::exit(1);
    }

    if let Err(err) = run(&args[1]).await {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_is_parsed_as_ether() {
        assert_eq!(
            parse_amount("0.01").unwrap(),
            U256::from(10_000_000_000_000_000u64)
        );
        assert!(parse_amount("0").is_err());
        assert!(parse_amount("lots").is_err());
    }
}
