//! Default templates used when a page has neither a draft nor a published
//! version yet.

use async_trait::async_trait;
use serde_json::json;

use crate::configuration::{ConfigurationTree, SlotDef};
use crate::error::CoreError;
use crate::page_type::PageType;

/// Supplies the initial tree for a page type.
#[async_trait]
pub trait TemplateProvider: Send + Sync {
    async fn default_template(&self, page_type: PageType) -> Result<ConfigurationTree, CoreError>;
}

/// Templates compiled into the binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinTemplates;

#[async_trait]
impl TemplateProvider for BuiltinTemplates {
    async fn default_template(&self, page_type: PageType) -> Result<ConfigurationTree, CoreError> {
        Ok(builtin_template(page_type))
    }
}

/// The built-in template for `page_type`.
pub fn builtin_template(page_type: PageType) -> ConfigurationTree {
    match page_type {
        PageType::Cart => build(
            page_type,
            &["cart_page"],
            vec![
                ("cart_page", container(&["cart_title", "cart_items", "cart_summary"])),
                ("cart_title", text("Your cart")),
                ("cart_items", SlotDef::new("cart_items")),
                ("cart_summary", container(&["cart_totals", "checkout_button"])),
                ("cart_totals", SlotDef::new("cart_totals")),
                ("checkout_button", button("Proceed to checkout", "/checkout")),
            ],
        ),
        PageType::Product => build(
            page_type,
            &["product_page"],
            vec![
                ("product_page", container(&["product_gallery", "product_info"])),
                ("product_gallery", SlotDef::new("image_gallery")),
                (
                    "product_info",
                    container(&["product_title", "product_price", "add_to_cart"]),
                ),
                ("product_title", SlotDef::new("product_title")),
                ("product_price", SlotDef::new("product_price")),
                ("add_to_cart", SlotDef::new("add_to_cart_button")),
            ],
        ),
        PageType::Category => build(
            page_type,
            &["category_page"],
            vec![
                (
                    "category_page",
                    container(&["category_header", "category_filters", "product_grid"]),
                ),
                ("category_header", SlotDef::new("category_header")),
                ("category_filters", SlotDef::new("layered_navigation")),
                (
                    "product_grid",
                    SlotDef::new("product_grid").with_prop("columns", json!(4)),
                ),
            ],
        ),
        PageType::Checkout => build(
            page_type,
            &["checkout_page"],
            vec![
                (
                    "checkout_page",
                    container(&["checkout_steps", "order_summary"]),
                ),
                ("checkout_steps", SlotDef::new("checkout_steps")),
                ("order_summary", SlotDef::new("order_summary")),
            ],
        ),
        PageType::Header => build(
            page_type,
            &["header"],
            vec![
                ("header", container(&["logo", "navigation", "mini_cart"])),
                ("logo", SlotDef::new("logo")),
                ("navigation", SlotDef::new("navigation")),
                ("mini_cart", SlotDef::new("mini_cart")),
            ],
        ),
        PageType::Footer => build(
            page_type,
            &["footer"],
            vec![
                ("footer", container(&["footer_links", "copyright"])),
                ("footer_links", SlotDef::new("link_list")),
                ("copyright", text("All rights reserved.")),
            ],
        ),
        PageType::Homepage => build(
            page_type,
            &["hero", "featured_products"],
            vec![
                ("hero", SlotDef::new("image").with_prop("src", json!(""))),
                (
                    "featured_products",
                    SlotDef::new("product_grid").with_prop("columns", json!(4)),
                ),
            ],
        ),
        PageType::Success => build(
            page_type,
            &["success_page"],
            vec![
                ("success_page", container(&["success_title", "order_details"])),
                ("success_title", text("Thank you for your order!")),
                ("order_details", SlotDef::new("order_details")),
            ],
        ),
    }
}

fn build(page_type: PageType, roots: &[&str], slots: Vec<(&str, SlotDef)>) -> ConfigurationTree {
    let mut tree = ConfigurationTree::empty();
    for (id, slot) in slots {
        tree.slots.insert(id.to_string(), slot);
    }
    tree.root_slots = roots.iter().map(|r| r.to_string()).collect();
    tree.metadata
        .insert("pageType".to_string(), json!(page_type.as_str()));
    tree.metadata
        .insert("source".to_string(), json!("default_template"));
    tree
}

fn container(children: &[&str]) -> SlotDef {
    SlotDef::new("container").with_children(children)
}

fn text(content: &str) -> SlotDef {
    SlotDef::new("text").with_content(json!(content))
}

fn button(label: &str, href: &str) -> SlotDef {
    SlotDef::new("button")
        .with_content(json!(label))
        .with_prop("href", json!(href))
}
