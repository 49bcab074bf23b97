use crate::models::TargetApp;

/// Natural-language search script for one app.
pub fn search_script(app: TargetApp, product: &str) -> String {
    let launcher = app.launcher_label();
    let name = app.display_name();

    match app {
        TargetApp::Flipkart => format!(
            "Find price of '{product}' on {name}.\n\n\
             1. open_app('{launcher}')\n\
             2. Wait 2 sec\n\
             3. Tap search bar\n\
             4. Type '{product}'\n\
             5. Tap search/Enter\n\
             6. LOOK at first result - find price (₹XXX)\n\
             7. Call: complete(success=True, reason=\"PRICE: ₹XXX for [product]\")\n\n\
             If stuck, use system_button('Back')\n"
        ),
        TargetApp::Amazon => format!(
            "Find price of '{product}' on {name}.\n\n\
             1. open_app('{launcher}')\n\
             2. Wait 2 sec\n\
             3. Tap search bar\n\
             4. Type '{product}'\n\
             5. Tap search\n\
             6. Look at FIRST result price\n\
             7. Call: complete(success=True, reason=\"PRICE: ₹XXX for [product]\")\n"
        ),
        TargetApp::Blinkit | TargetApp::Zepto => format!(
            "Find price of '{product}' on {name}.\n\n\
             1. open_app('{launcher}')\n\
             2. Tap search\n\
             3. Type '{product}'\n\
             4. Look at first product price\n\
             5. Call: complete(success=True, reason=\"PRICE: ₹XXX for [product]\")\n"
        ),
    }
}

/// Cash-on-delivery order script.
pub fn order_script(app: TargetApp, product: &str) -> String {
    let name = app.display_name();
    format!(
        "Order '{product}' from {name} with COD.\n\n\
         1. Open {name}\n\
         2. Search '{product}'\n\
         3. Add first result to cart\n\
         4. Checkout\n\
         5. Select Cash on Delivery\n\
         6. Use default address\n\
         7. Place order\n\
         8. complete(success=True, reason=\"Order placed!\")\n"
    )
}
