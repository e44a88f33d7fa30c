//! CLI commands

use chrono::Utc;
use freetag_compliance::KycPolicy;
use freetag_conversion::parse_amount;
use freetag_core::{Asset, MinorUnits};
use freetag_donation::{
    DonationForm, FlowOutcome, PaymentMethod, TagExtractor, TradeQuote, TradeReceipt,
};
use freetag_session::{resolve_route, CurrentSession, TokenRole};
use rust_decimal::Decimal;
use std::time::Duration;

use crate::context::AppContext;

/// Show rates quoted in `target`, optionally polling for `watch_secs`
pub async fn rates(
    ctx: &AppContext,
    target: &Asset,
    watch_secs: Option<u64>,
) -> Result<(), anyhow::Error> {
    let Some(secs) = watch_secs else {
        ctx.rates.refresh(target).await?;
        print_rates(ctx, target);
        return Ok(());
    };

    let interval = ctx.config.rates.poll_interval();
    let handle = ctx.rates.watch(target.clone(), interval);
    let deadline = tokio::time::Instant::now() + Duration::from_secs(secs);

    // Let the first poll land before printing
    tokio::time::sleep(Duration::from_millis(500).min(interval)).await;
    loop {
        print_rates(ctx, target);
        if tokio::time::Instant::now() + interval > deadline {
            break;
        }
        tokio::time::sleep(interval).await;
    }

    handle.stop();
    Ok(())
}

fn print_rates(ctx: &AppContext, target: &Asset) {
    let rates = ctx.rates.rates_for(target);
    if rates.is_empty() {
        println!("No rates available for {}", target);
        return;
    }

    println!("Rates in {} ({})", target, Utc::now().format("%H:%M:%S"));
    for rate in rates {
        let stale = if rate.is_stale(ctx.config.rates.stale_after_secs) {
            " (stale)"
        } else {
            ""
        };
        println!(
            "  1 {:<6} = {} {}{}",
            rate.from_asset.code(),
            MinorUnits::new(rate.rate_minor_units).to_major(),
            rate.to_currency,
            stale
        );
    }
}

/// Convert between an asset and its quote currency
///
/// Forward: `amount` of `from` in `to`. Inverse: how much `from` an
/// `amount` of `to` buys.
pub async fn convert(
    ctx: &AppContext,
    amount: &str,
    from: &Asset,
    to: &Asset,
    inverse: bool,
) -> Result<(), anyhow::Error> {
    let Some(amount) = parse_amount(amount) else {
        anyhow::bail!("Invalid amount: {:?}", amount);
    };
    ctx.refresh_rates(std::slice::from_ref(to)).await;

    if inverse {
        let result = ctx.conversion.quote_inverse(amount, from, to);
        println!("{} {} buys {} {}", amount, to, result.source_amount(), from);
    } else {
        let result = ctx.conversion.quote(amount, from, to);
        println!(
            "{} {} = {} {}",
            amount,
            from,
            result.target_minor_units.to_major(),
            to
        );
    }

    if ctx.rates.get_rate(from, to).is_none() {
        println!("⚠️  No {} → {} rate available", from, to);
    }
    Ok(())
}

/// Evaluate the KYC threshold for `amount` of `asset`
pub async fn kyc(
    ctx: &AppContext,
    amount: Decimal,
    asset: &Asset,
    policy: KycPolicy,
) -> Result<(), anyhow::Error> {
    ctx.refresh_rates(&[Asset::Usd]).await;
    let decision = ctx.compliance.evaluate_live(amount, asset);

    match decision.usd_equivalent_minor_units {
        Some(usd) => println!("{} {} ≈ ${} USD", amount, asset, usd.to_major()),
        None => println!("{} {}: USD value unknown", amount, asset),
    }
    if let Some(message) = decision.message() {
        println!("⚠️  {}", message);
    } else {
        println!("✅ No verification required");
    }
    println!(
        "Submit under {:?} policy: {}",
        policy,
        if policy.allows_submit(&decision) { "enabled" } else { "disabled" }
    );
    Ok(())
}

/// Store a token and show where it lands
pub async fn login(ctx: &AppContext, token: &str, role: Option<&str>) -> Result<(), anyhow::Error> {
    let role = role
        .map(|r| r.parse::<TokenRole>())
        .transpose()
        .map_err(|_| {
            anyhow::anyhow!("Unknown login role (expected user, beneficiary or philanthropist)")
        })?;

    ctx.session.login(token, role)?;
    println!("✅ Token stored");
    whoami(ctx).await
}

/// Resolve the stored token into a session and landing route
pub async fn whoami(ctx: &AppContext) -> Result<(), anyhow::Error> {
    let session = ctx.session.resolve().await;
    println!("{}", describe_session(&session));
    println!("Route: {}", resolve_route(&session));
    Ok(())
}

fn describe_session(session: &CurrentSession) -> String {
    match session {
        CurrentSession::None => "Not signed in".to_string(),
        CurrentSession::StandardUser { display_name, email, roles, .. } => {
            let roles: Vec<String> = roles.iter().map(|r| r.to_string()).collect();
            format!("User {} <{}> [{}]", display_name, email, roles.join(", "))
        }
        CurrentSession::Beneficiary { tag_code, beneficiary_name } => {
            format!("Beneficiary {} (tag {})", beneficiary_name, tag_code)
        }
        CurrentSession::Philanthropist { display_name, email } => {
            format!("Philanthropist {} <{}>", display_name, email)
        }
    }
}

/// Clear the session
pub async fn logout(ctx: &AppContext) -> Result<(), anyhow::Error> {
    let redirect = ctx.session.logout()?;
    println!("✅ Logged out, redirect to {}", redirect);
    Ok(())
}

/// Extract a tag code from a scanned QR payload
pub fn scan(payload: &str) -> Result<(), anyhow::Error> {
    let hit = TagExtractor::ORDER
        .iter()
        .find_map(|extractor| extractor.extract(payload).map(|code| (extractor, code)));

    match hit {
        Some((extractor, code)) => {
            println!("{} (via {:?})", code, extractor);
            Ok(())
        }
        None => anyhow::bail!("No tag code found in {:?}", payload),
    }
}

/// Donation form as entered on the command line
#[derive(Debug, Clone)]
pub struct DonationInput {
    pub tag: String,
    pub amount: String,
    pub currency: Asset,
    pub crypto: Option<Asset>,
    pub country: String,
    pub accept_terms: bool,
    pub receipt_name: Option<String>,
    pub receipt_email: Option<String>,
}

impl DonationInput {
    pub fn into_form(self) -> DonationForm {
        let mut form = DonationForm::new(self.tag, self.amount).with_currency(self.currency);
        form.consent = self.accept_terms;
        form.country = self.country;
        if let Some(asset) = self.crypto {
            form = form.with_method(PaymentMethod::Crypto { asset });
        }
        if self.receipt_name.is_some() || self.receipt_email.is_some() {
            form = form.with_tax_receipt(
                self.receipt_name.unwrap_or_default(),
                self.receipt_email.unwrap_or_default(),
            );
        }
        form
    }
}

/// Quote and (unless `preview_only`) submit a donation
pub async fn donate(
    ctx: &AppContext,
    form: DonationForm,
    preview_only: bool,
) -> Result<(), anyhow::Error> {
    ctx.refresh_rates(&[form.currency.clone(), Asset::Usd, Asset::Zar]).await;

    let quote = ctx.donations.preview(&form);
    println!("Donating {} {} to {}", quote.amount, quote.currency, form.recipient);
    if let Some(crypto) = &quote.crypto {
        if crypto.rate_available {
            println!("  ≈ {} {}", crypto.amount, crypto.asset);
        } else {
            println!("  {} rate unavailable", crypto.asset);
        }
    }
    if let Some(warning) = &quote.warning {
        println!("⚠️  {}", warning);
    }

    if preview_only {
        return Ok(());
    }

    // Kept until the donation succeeds
    ctx.drafts.save(&form, Utc::now())?;

    match ctx.donations.submit(form).await {
        Ok(FlowOutcome::Redirect { url }) => {
            println!("✅ Continue at {}", url);
            Ok(())
        }
        Ok(FlowOutcome::Settled { crypto_ref, receipt }) => {
            println!(
                "✅ Donation {} {} ({})",
                crypto_ref,
                receipt.status,
                receipt.tx_id.unwrap_or_default()
            );
            if let Some(url) = receipt.redirect_url {
                println!("Receipt: {}", url);
            }
            Ok(())
        }
        Err(e) => {
            tracing::debug!(error = %e, "Donation attempt failed");
            anyhow::bail!("{}", e.user_message())
        }
    }
}

/// Buy USDT with ZAR
pub async fn buy(ctx: &AppContext, amount_zar: Decimal) -> Result<(), anyhow::Error> {
    ctx.refresh_rates(&[Asset::Zar, Asset::Usd]).await;
    let quote = ctx.trades.quote_buy(amount_zar);
    print_trade_quote(&quote, &Asset::Zar, &Asset::Usdt);

    let receipt = ctx
        .trades
        .buy(amount_zar)
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;
    print_trade_receipt(&receipt);
    Ok(())
}

/// Sell USDT for ZAR
pub async fn sell(ctx: &AppContext, amount_usdt: Decimal) -> Result<(), anyhow::Error> {
    ctx.refresh_rates(&[Asset::Zar, Asset::Usd]).await;
    let quote = ctx.trades.quote_sell(amount_usdt);
    print_trade_quote(&quote, &Asset::Usdt, &Asset::Zar);

    let receipt = ctx
        .trades
        .sell(amount_usdt)
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;
    print_trade_receipt(&receipt);
    Ok(())
}

fn print_trade_quote(quote: &TradeQuote, spend: &Asset, receive: &Asset) {
    println!("{} {} → {} {}", quote.input, spend, quote.output, receive);
    if let Some(warning) = &quote.warning {
        println!("⚠️  {}", warning);
    }
}

fn print_trade_receipt(receipt: &TradeReceipt) {
    println!(
        "✅ {} settled: {} ZAR / {} USDT, fees {}",
        receipt.reference.as_deref().unwrap_or("Trade"),
        receipt.amount_zar,
        receipt.amount_usdt,
        receipt.fees.total()
    );
    if receipt.dust_donated_usdt > Decimal::ZERO {
        println!("💚 {} USDT dust donated", receipt.dust_donated_usdt);
    }
}

/// Show the saved draft, discarding it if expired
pub fn draft_show(ctx: &AppContext) -> Result<(), anyhow::Error> {
    let saved_at = ctx.drafts.snapshot().map(|s| s.saved_at);
    match ctx.drafts.load(Utc::now()) {
        Some(form) => {
            if let Some(saved_at) = saved_at {
                println!("Saved {}", saved_at.to_rfc3339());
            }
            println!("{}", serde_json::to_string_pretty(&form)?);
        }
        None => println!("No draft"),
    }
    Ok(())
}

/// Save a draft without submitting
pub fn draft_save(ctx: &AppContext, form: DonationForm) -> Result<(), anyhow::Error> {
    ctx.drafts.save(&form, Utc::now())?;
    println!("✅ Draft saved");
    Ok(())
}

/// Start fresh
pub fn draft_clear(ctx: &AppContext) -> Result<(), anyhow::Error> {
    ctx.drafts.clear()?;
    println!("✅ Draft cleared");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use freetag_donation::TaxReceipt;

    fn input() -> DonationInput {
        DonationInput {
            tag: "FT-1001".to_string(),
            amount: "100".to_string(),
            currency: Asset::Zar,
            crypto: None,
            country: "ZA".to_string(),
            accept_terms: false,
            receipt_name: None,
            receipt_email: None,
        }
    }

    #[test]
    fn test_terms_flag_drives_consent() {
        let form = input().into_form();
        assert!(!form.consent);
        assert_eq!(form.method, PaymentMethod::Bank);
        assert!(form.validate().is_err());
    }

    #[test]
    fn test_crypto_and_receipt_flags() {
        let form = DonationInput {
            crypto: Some(Asset::Usdt),
            accept_terms: true,
            receipt_email: Some("sam@example.org".to_string()),
            ..input()
        }
        .into_form();

        assert_eq!(form.method, PaymentMethod::Crypto { asset: Asset::Usdt });
        assert_eq!(
            form.tax_receipt,
            Some(TaxReceipt {
                name: String::new(),
                email: "sam@example.org".to_string(),
            })
        );
        // Name missing
        assert!(form.validate().is_err());
    }

    #[test]
    fn test_scan() {
        assert!(scan("https://freetag.org/donate?tag=FT-1001").is_ok());
        assert!(scan("!!").is_err());
    }
}
