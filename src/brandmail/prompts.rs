// SPDX-License-Identifier: MIT

//! Fixed instruction templates for the two model calls

use crate::adk::chain::PromptTemplate;

pub const EMAIL_INSTRUCTION: &str = "You are an experienced marketer who writes marketing \
emails tailored to a specific brand, product and product description.";

const EMAIL_TEMPLATE: &str = "The brand is {brand_name} and the product is {product_name}.
Write a compelling marketing email of fewer than 200 words about {product_name}, \
which is described as: {product_description}

Reply with the email only, without any preamble or explanation.";

pub const KEYWORD_INSTRUCTION: &str =
    "You are an expert at inferring the keywords that describe a brand from its website.";

const KEYWORD_TEMPLATE: &str = "Website title: {website_title}

Website content:
{website_content}

Return a JSON object with a single key \"keywords\" holding no more than 3 keywords. \
Do not add any preamble or explanation.";

pub fn email_prompt() -> PromptTemplate {
    PromptTemplate::new(
        EMAIL_TEMPLATE,
        &["brand_name", "product_name", "product_description"],
    )
}

pub fn keyword_prompt() -> PromptTemplate {
    PromptTemplate::new(KEYWORD_TEMPLATE, &["website_title", "website_content"])
}
