
/// Index page in the shape the listing site renders it
pub(crate) const INDEX_PAGE: &str = r#"
<html><body>
  <button data-testid="filters-form-dropdown-category-type"><span> Commercial for Rent </span></button>
  <article>
    <a class="property-card-module_property-card__link__L6AKb"
       href="/en/plp/commercial-rent/office-42.html"
       title="2 Bedroom - 3 Bathroom - Apartment"></a>
    <h2>  Sea View
      Office </h2>
    <img src="https://static.example.com/img/42.jpg">
    <div class="styles_price__x1">AED 120,000</div>
    <span class="card_location__y2">Business Bay, Dubai</span>
    <p>Furnished</p>
    <p>Area: 1,250 sqft</p>
    <p>Plot: 9,999 sq ft</p>
  </article>
  <article>
    <h2>Warehouse</h2>
    <p>No link on this card</p>
  </article>
  <a aria-label="Next" href="?page=2">Next</a>
</body></html>
"#;
