//! Rendering and interaction loop of the shop message.

use super::{
    ids::{ShopAction, session_prefix},
    session::{Reaction, ShopCatalogue, ShopSession, Step},
};
use crate::{
    bot::{
        Context,
        commands::utils::{EMBED_DESCRIPTION_LIMIT, EMBED_FIELD_LIMIT, fit_lines, truncate_chars},
    },
    core::{
        cart,
        payment_qr::{self, GENERATED_FILE_NAME, PaymentQr},
        product, purchase, settings,
    },
    errors::Result,
    models::{Product, PurchaseRecord},
};
use poise::{CreateReply, Modal, serenity_prelude as serenity};
use std::time::Duration;
use tracing::{info, instrument, warn};

/// A shop message stops reacting after this long without a press.
pub const SESSION_TIMEOUT: Duration = Duration::from_secs(300);
const MODAL_TIMEOUT: Duration = Duration::from_secs(120);
const SHOP_COLOR: u32 = 0x00F1_C40F;
const MAX_LABEL_LEN: usize = 80;

#[derive(Debug, Modal)]
#[name = "Quantity"]
struct QuantityModal {
    #[name = "How many? (0 removes the item)"]
    #[placeholder = "1"]
    #[min_length = 1]
    #[max_length = 3]
    quantity: String,
}

/// Sends the shop message and runs its session until checkout or timeout.
#[instrument(skip(ctx), fields(user = %ctx.author().name))]
pub async fn run_shop(ctx: Context<'_>) -> Result<()> {
    let store = &ctx.data().store;
    let session_id = ctx.id();
    let mut session = ShopSession::new();

    let catalogue = ShopCatalogue::load(store).await;
    let (embed, components) = render(&session, &catalogue, session_id);
    let reply = ctx
        .send(CreateReply::default().embed(embed).components(components))
        .await?;

    let prefix = session_prefix(session_id);
    loop {
        let filter_prefix = prefix.clone();
        let Some(press) = serenity::ComponentInteractionCollector::new(ctx.serenity_context())
            .filter(move |press| press.data.custom_id.starts_with(&filter_prefix))
            .timeout(SESSION_TIMEOUT)
            .await
        else {
            let expired = serenity::CreateEmbed::default()
                .title("🛒 Shop closed")
                .description("This shop session has expired. Use `shop` to open a new one.")
                .color(SHOP_COLOR);
            reply
                .edit(ctx, CreateReply::default().embed(expired).components(Vec::new()))
                .await?;
            return Ok(());
        };

        if press.user.id != ctx.author().id {
            let notice = serenity::CreateInteractionResponseMessage::new()
                .content("❌ This shop belongs to someone else. Use `shop` to open your own.")
                .ephemeral(true);
            press
                .create_response(
                    ctx.serenity_context(),
                    serenity::CreateInteractionResponse::Message(notice),
                )
                .await?;
            continue;
        }

        let Some(action) = ShopAction::parse(&press.data.custom_id, session_id) else {
            continue;
        };

        let catalogue = ShopCatalogue::load(store).await;
        let mut reaction = session.apply(action, &catalogue);
        if reaction == Reaction::Checkout && session.cart.lines(&catalogue.products).is_empty() {
            // Everything in the cart was removed from the catalogue meanwhile
            session.cart.clear();
            reaction = Reaction::Render;
        }

        match reaction {
            Reaction::Render => {
                let (embed, components) = render(&session, &catalogue, session_id);
                let update = serenity::CreateInteractionResponseMessage::new()
                    .embed(embed)
                    .components(components);
                press
                    .create_response(
                        ctx.serenity_context(),
                        serenity::CreateInteractionResponse::UpdateMessage(update),
                    )
                    .await?;
            }
            Reaction::AskQuantity(product) => {
                ask_quantity(ctx, press, &mut session, &product).await?;
                let catalogue = ShopCatalogue::load(store).await;
                let (embed, components) = render(&session, &catalogue, session_id);
                reply
                    .edit(ctx, CreateReply::default().embed(embed).components(components))
                    .await?;
            }
            Reaction::Checkout => {
                let (embed, qr_file) = checkout(ctx, &press.user, &session, &catalogue).await?;
                let mut update = serenity::CreateInteractionResponseMessage::new()
                    .embed(embed)
                    .components(Vec::new());
                if let Some(file) = qr_file {
                    update = update.add_file(file);
                }
                press
                    .create_response(
                        ctx.serenity_context(),
                        serenity::CreateInteractionResponse::UpdateMessage(update),
                    )
                    .await?;
                return Ok(());
            }
        }
    }
}

/// Opens the quantity modal for `product` and applies the answer to the cart.
async fn ask_quantity(
    ctx: Context<'_>,
    press: serenity::ComponentInteraction,
    session: &mut ShopSession,
    product: &Product,
) -> Result<()> {
    let current = session.cart.quantity(&product.cart_id());
    let defaults = QuantityModal {
        quantity: if current == 0 { "1".to_string() } else { current.to_string() },
    };

    let answer = poise::execute_modal_on_component_interaction::<QuantityModal>(
        ctx,
        press,
        Some(defaults),
        Some(MODAL_TIMEOUT),
    )
    .await?;

    let Some(answer) = answer else {
        return Ok(());
    };

    match cart::parse_quantity(&answer.quantity) {
        Ok(quantity) => session.cart.set_quantity(&product.cart_id(), quantity),
        Err(e) => {
            ctx.send(
                CreateReply::default()
                    .content(format!(
                        "❌ {e}. Enter a whole number from 0 to {}.",
                        cart::MAX_QUANTITY
                    ))
                    .ephemeral(true),
            )
            .await?;
        }
    }
    Ok(())
}

/// Logs the purchase and builds the receipt shown in place of the shop, plus the QR code
/// image to attach when it was generated.
async fn checkout(
    ctx: Context<'_>,
    user: &serenity::User,
    session: &ShopSession,
    catalogue: &ShopCatalogue,
) -> Result<(serenity::CreateEmbed, Option<serenity::CreateAttachment>)> {
    let store = &ctx.data().store;
    let lines = session.cart.lines(&catalogue.products);
    let total = cart::total_price(&lines);

    if lines.len() < session.cart.len() {
        warn!(
            "{} cart line(s) dropped at checkout because the product is gone",
            session.cart.len() - lines.len()
        );
    }

    let record =
        purchase::log_purchase(store, &user.id.to_string(), &user.name, lines, total).await?;
    info!("Checkout by {} for {:.2}", user.name, total);

    let memo = format!(
        "{}\nTotal: {:.2}\n{}",
        payment_qr::SHOP_MEMO,
        record.total_price,
        record.user_name
    );
    let qr = payment_qr::payment_qr(store, &memo).await?;
    let thank_you = settings::load_thank_you_message(store).await;
    let embed = receipt_embed(&record, &qr.embed_url(), &thank_you);
    let file = match qr {
        PaymentQr::Url(_) => None,
        PaymentQr::Generated(png) => {
            Some(serenity::CreateAttachment::bytes(png, GENERATED_FILE_NAME))
        }
    };
    Ok((embed, file))
}

fn receipt_embed(record: &PurchaseRecord, qr_url: &str, thank_you: &str) -> serenity::CreateEmbed {
    serenity::CreateEmbed::default()
        .title("🧾 Receipt")
        .description(receipt_description(record, thank_you))
        .image(qr_url)
        .color(SHOP_COLOR)
        .footer(serenity::CreateEmbedFooter::new(format!(
            "Scan the QR code to pay • {}",
            record.user_name
        )))
        .timestamp(serenity::Timestamp::from(record.timestamp))
}

/// One line per item, then the total and the thank-you message.
fn receipt_description(record: &PurchaseRecord, thank_you: &str) -> String {
    let lines: Vec<String> = record
        .items
        .iter()
        .map(|item| {
            format!(
                "{} × {} @ {:.2} = **{:.2}**",
                item.quantity, item.name, item.unit_price, item.subtotal
            )
        })
        .collect();

    let tail = format!("\n**Total: {:.2}**\n\n{}", record.total_price, thank_you);
    fit_lines(&lines, Some(&tail), EMBED_DESCRIPTION_LIMIT)
}

/// Builds the embed and buttons for the current state of a session.
pub fn render(
    session: &ShopSession,
    catalogue: &ShopCatalogue,
    session_id: u64,
) -> (serenity::CreateEmbed, Vec<serenity::CreateActionRow>) {
    let page_count = session.page_count(catalogue);
    let page = session.page.min(page_count - 1);

    let (description, buttons) = match &session.step {
        Step::Countries => {
            let buttons = cart::page_slice(&catalogue.countries, page)
                .iter()
                .map(|c| {
                    button(
                        ShopAction::Country(c.code.clone()),
                        session_id,
                        &format!("{} {}", c.emoji, c.name),
                    )
                    .style(serenity::ButtonStyle::Primary)
                })
                .collect::<Vec<_>>();
            ("Choose a country.".to_string(), buttons)
        }
        Step::Categories { country } => {
            let buttons = cart::page_slice(&catalogue.categories, page)
                .iter()
                .map(|c| {
                    button(
                        ShopAction::Category(c.code.clone()),
                        session_id,
                        &format!("{} {}", c.emoji, c.name),
                    )
                    .style(serenity::ButtonStyle::Primary)
                })
                .collect::<Vec<_>>();
            (
                format!("{}\nChoose a category.", country_label(catalogue, country)),
                buttons,
            )
        }
        Step::Products { country, category } => {
            let products = catalogue.products_in(country, category);
            let buttons = cart::page_slice(&products, page)
                .iter()
                .map(|p| product_button(session, p, session_id))
                .collect::<Vec<_>>();
            let header = format!(
                "{} › {}",
                country_label(catalogue, country),
                category_label(catalogue, category)
            );
            let text = if products.is_empty() {
                format!("{header}\nNo products here yet.")
            } else {
                format!("{header}\nPick a product to set its quantity.")
            };
            (text, buttons)
        }
    };

    let mut embed = serenity::CreateEmbed::default()
        .title("🛒 Ducky Shop")
        .description(description)
        .color(SHOP_COLOR)
        .field("Cart", cart_summary(session, catalogue), false);
    if page_count > 1 {
        embed = embed.footer(serenity::CreateEmbedFooter::new(format!(
            "Page {}/{}",
            page + 1,
            page_count
        )));
    }

    let mut rows: Vec<serenity::CreateActionRow> = buttons
        .chunks(5)
        .map(|chunk| serenity::CreateActionRow::Buttons(chunk.to_vec()))
        .collect();
    rows.push(navigation_row(session, page, page_count, session_id));
    (embed, rows)
}

fn product_button(session: &ShopSession, product: &Product, session_id: u64) -> serenity::CreateButton {
    let in_cart = session.cart.quantity(&product.cart_id());
    let mut label = format!("{} {} - {:.2}", product.emoji, product.name, product.price);
    if in_cart > 0 {
        label = format!("{label} (×{in_cart})");
    }

    let style = if in_cart > 0 {
        serenity::ButtonStyle::Success
    } else {
        serenity::ButtonStyle::Secondary
    };
    button(ShopAction::Product(product.name.clone()), session_id, &label)
        .style(style)
        .disabled(product::is_placeholder(product))
}

fn navigation_row(
    session: &ShopSession,
    page: usize,
    page_count: usize,
    session_id: u64,
) -> serenity::CreateActionRow {
    let empty_cart = session.cart.is_empty();
    serenity::CreateActionRow::Buttons(vec![
        button(ShopAction::Back, session_id, "◀ Back")
            .style(serenity::ButtonStyle::Secondary)
            .disabled(session.step == Step::Countries),
        button(ShopAction::Previous, session_id, "⬅ Prev")
            .style(serenity::ButtonStyle::Secondary)
            .disabled(page == 0),
        button(ShopAction::Next, session_id, "Next ➡")
            .style(serenity::ButtonStyle::Secondary)
            .disabled(page + 1 >= page_count),
        button(ShopAction::ClearCart, session_id, "🗑 Clear cart")
            .style(serenity::ButtonStyle::Danger)
            .disabled(empty_cart),
        button(ShopAction::Checkout, session_id, "✅ Checkout")
            .style(serenity::ButtonStyle::Success)
            .disabled(empty_cart),
    ])
}

fn button(action: ShopAction, session_id: u64, label: &str) -> serenity::CreateButton {
    serenity::CreateButton::new(action.custom_id(session_id))
        .label(truncate_chars(label, MAX_LABEL_LEN))
}

fn country_label(catalogue: &ShopCatalogue, code: &str) -> String {
    catalogue
        .country(code)
        .map_or_else(|| code.to_string(), |c| format!("{} {}", c.emoji, c.name))
}

fn category_label(catalogue: &ShopCatalogue, code: &str) -> String {
    catalogue
        .category(code)
        .map_or_else(|| code.to_string(), |c| format!("{} {}", c.emoji, c.name))
}

fn cart_summary(session: &ShopSession, catalogue: &ShopCatalogue) -> String {
    let lines = session.cart.lines(&catalogue.products);
    if lines.is_empty() {
        return "Your cart is empty.".to_string();
    }
    let text: Vec<String> = lines
        .iter()
        .map(|l| format!("{} × {} = {:.2}", l.quantity, l.name, l.subtotal))
        .collect();
    let total = format!("**Total: {:.2}**", cart::total_price(&lines));
    fit_lines(&text, Some(&total), EMBED_FIELD_LIMIT)
}
