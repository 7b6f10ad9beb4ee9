//! Answer-card extraction from a results page.
//!
//! Google renders instant answers (calculator, weather, definitions, ...)
//! in a card above the organic results. There is no grammar here, only a
//! series of known markup shapes probed in source order; anything
//! unexpected inside a shape drops the card rather than erroring.

use scraper::{ElementRef, Html, Selector};

/// A reply renders at most this many labeled fields.
pub const MAX_FIELDS: usize = 5;

/// An ad-hoc summary extracted from a results page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Card {
    pub title: String,
    pub description: String,
    /// Render the description emphasized (the weather condition is).
    pub italic_description: bool,
    pub fields: Vec<CardField>,
    pub thumbnail: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CardField {
    pub name: String,
    pub value: String,
}

impl Card {
    fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            italic_description: false,
            fields: Vec::new(),
            thumbnail: None,
        }
    }

    /// Add a labeled field. Silently dropped past [`MAX_FIELDS`].
    pub fn add_field(&mut self, name: impl Into<String>, value: impl Into<String>) {
        if self.fields.len() < MAX_FIELDS {
            self.fields.push(CardField {
                name: name.into(),
                value: value.into(),
            });
        }
    }
}

// Class attributes are matched exactly, not token-wise: the unit card is
// class="_Tsb" and must not swallow the time card's class="_Tsb _HOb _Qeb".
fn sel(selector: &str) -> Selector {
    Selector::parse(selector).unwrap()
}

fn text_of(el: ElementRef) -> String {
    el.text().collect()
}

fn child_elements<'a>(el: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    el.children().filter_map(ElementRef::wrap)
}

fn parent_element(el: ElementRef) -> Option<ElementRef> {
    el.parent().and_then(ElementRef::wrap)
}

/// Extract the answer card, if the page has one we recognize.
///
/// The first pattern found decides the outcome: a present-but-malformed
/// pattern yields no card instead of falling through, since markup drift
/// in one card means later guesses are stale too.
pub fn parse_card(doc: &Html) -> Option<Card> {
    let topstuff = doc.select(&sel(r#"div[id="topstuff"]"#)).next()?;

    // The calculator lives inside the card container itself
    if let Some(result) = topstuff
        .select(&sel(r#"table tr td span[class="nobr"] > h2[class="r"]"#))
        .next()
    {
        return Some(Card::new("Calculator", text_of(result)));
    }

    // Everything else hangs off the container's parent
    let parent = parent_element(topstuff)?;

    if let Some(unit) = parent.select(&sel(r#"ol div[class="_Tsb"]"#)).next() {
        let description: String = child_elements(unit).map(text_of).collect();
        return Some(Card::new("Unit Conversion", description));
    }

    if let Some(currency) = parent
        .select(&sel(r#"ol > table[class="std _tLi"] td > h2"#))
        .next()
    {
        return Some(Card::new("Currency Conversion", text_of(currency)));
    }

    if let Some(release) = parent.select(&sel(r#"div[id="_vBb"]"#)).next() {
        return release_card(release);
    }

    if let Some(words) = parent
        .select(&sel(r#"ol div[class="g"] > div > h3[class="r"] > div"#))
        .next()
    {
        // Only commit to the definition card once its info table is
        // located; otherwise keep probing
        if let Some(info) = definition_info(words) {
            return definition_card(words, info);
        }
    }

    if let Some(time) = parent
        .select(&sel(r#"ol div[class="_Tsb _HOb _Qeb"]"#))
        .next()
    {
        return time_card(time);
    }

    let weather = parent.select(&sel(r#"ol div[class="e"]"#)).next()?;
    weather_card(weather)
}

/// Release-date card: description first, title second.
fn release_card(release: ElementRef) -> Option<Card> {
    let mut children = child_elements(release);
    let description = text_of(children.next()?).trim().to_string();
    let title = text_of(children.next()?).trim().to_string();
    Some(Card::new(title, description))
}

/// The definition table sits two levels above the word block, as its
/// second child.
fn definition_info<'a>(words: ElementRef<'a>) -> Option<ElementRef<'a>> {
    let h3 = parent_element(words)?;
    let block = parent_element(h3)?;
    child_elements(block).nth(1)
}

fn definition_card(words: ElementRef, info: ElementRef) -> Option<Card> {
    // Two spans: the word itself and its pronunciation
    let mut spans = child_elements(words);
    let title = text_of(spans.next()?);
    let description = text_of(spans.next()?);

    let mut card = Card::new(title, description);

    // Definition rows are attribute-less <tr>s grouped by lexical
    // category; the first decorated row ends the list
    for row in info.select(&sel("tr")) {
        if row.value().attrs().next().is_some() {
            break;
        }
        let Some(data) = child_elements(row).next() else {
            continue;
        };
        let mut cells = child_elements(data);
        let Some(category) = cells.next() else {
            continue;
        };
        let Some(list) = cells.next() else {
            continue;
        };
        let body: Vec<String> = child_elements(list)
            .enumerate()
            .map(|(i, definition)| format!("{}. {}", i + 1, text_of(definition)))
            .collect();
        if body.is_empty() {
            continue;
        }
        card.add_field(text_of(category), body.join("\n"));
    }

    Some(card)
}

fn time_card(time: ElementRef) -> Option<Card> {
    let place = text_of(time.select(&sel(r#"span[class="_HOb _Qeb"]"#)).next()?)
        .trim()
        .to_string();
    let the_time = text_of(time.select(&sel(r#"div[class="_rkc _Peb"]"#)).next()?)
        .trim()
        .to_string();
    let the_date = text_of(time.select(&sel(r#"div[class="_HOb _Qeb"]"#)).next()?)
        .trim()
        .to_string();
    Some(Card::new(place, format!("{the_time}\n{the_date}")))
}

/// The messiest of the lot: an <h3> location, then a table whose first
/// row carries the condition icon and temperature, fourth row the wind,
/// fifth row the humidity.
fn weather_card(weather: ElementRef) -> Option<Card> {
    let location = weather.select(&sel("h3")).next()?;
    let mut card = Card::new(text_of(location), String::new());

    let table = weather.select(&sel("table")).next()?;
    let rows: Vec<_> = table.select(&sel("tr")).collect();

    let first = rows.first()?;
    let cells: Vec<_> = child_elements(*first).collect();
    let img = cells.first()?.select(&sel("img")).next()?;
    let category = img.value().attr("alt")?.to_string();
    let image = format!("https:{}", img.value().attr("src")?);
    let temperature = text_of(
        cells
            .get(1)?
            .select(&sel(r#"span[class="wob_t"]"#))
            .next()?,
    );

    card.thumbnail = Some(image);
    card.description = category;
    card.italic_description = true;
    card.add_field("Temperature", temperature);

    let wind = text_of(*rows.get(3)?).replace("Wind: ", "");
    card.add_field("Wind", wind);

    let humidity_cell = child_elements(*rows.get(4)?).next()?;
    card.add_field("Humidity", text_of(humidity_cell).replace("Humidity: ", ""));

    Some(card)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> Option<Card> {
        let doc = Html::parse_document(body);
        parse_card(&doc)
    }

    #[test]
    fn test_no_card_container() {
        assert_eq!(parse(r#"<div class="g">organic only</div>"#), None);
    }

    #[test]
    fn test_calculator() {
        let card = parse(
            r#"<div><div id="topstuff">
                 <table><tr><td><span class="nobr"><h2 class="r">2 + 2 = 4</h2></span></td></tr></table>
               </div></div>"#,
        )
        .unwrap();
        assert_eq!(card.title, "Calculator");
        assert_eq!(card.description, "2 + 2 = 4");
        assert!(card.fields.is_empty());
    }

    #[test]
    fn test_unit_conversion() {
        let card = parse(
            r#"<div><div id="topstuff"></div>
               <ol><div class="_Tsb"><div>100 centimeters = </div><div>1 meter</div></div></ol>
               </div>"#,
        )
        .unwrap();
        assert_eq!(card.title, "Unit Conversion");
        assert_eq!(card.description, "100 centimeters = 1 meter");
    }

    #[test]
    fn test_currency_conversion() {
        let card = parse(
            r#"<div><div id="topstuff"></div>
               <ol><table class="std _tLi"><tr><td><h2>1 US Dollar = 0.92 Euro</h2></td></tr></table></ol>
               </div>"#,
        )
        .unwrap();
        assert_eq!(card.title, "Currency Conversion");
        assert_eq!(card.description, "1 US Dollar = 0.92 Euro");
    }

    #[test]
    fn test_release_date() {
        let card = parse(
            r#"<div><div id="topstuff"></div>
               <div id="_vBb"><div> March 3, 2017 </div><div> Nintendo Switch release date </div></div>
               </div>"#,
        )
        .unwrap();
        assert_eq!(card.title, "Nintendo Switch release date");
        assert_eq!(card.description, "March 3, 2017");
    }

    #[test]
    fn test_release_date_malformed_gives_nothing() {
        // Present but missing its second block: no card, no fallthrough
        let result = parse(
            r#"<div><div id="topstuff"></div>
               <div id="_vBb"><div>March 3, 2017</div></div>
               <ol><div class="e"><h3>Weather for Tokyo</h3></div></ol>
               </div>"#,
        );
        assert_eq!(result, None);
    }

    #[test]
    fn test_definition() {
        let card = parse(
            r#"<div><div id="topstuff"></div>
               <ol><div class="g"><div>
                 <h3 class="r"><div><span>crab</span><span>/krab/</span></div></h3>
                 <table>
                   <tr><td>
                     <div>noun</div>
                     <div><div>a crustacean with a broad carapace</div><div>a crane for a heavy weight</div></div>
                   </td></tr>
                   <tr><td>
                     <div>verb</div>
                     <div><div>move sideways or obliquely</div></div>
                   </td></tr>
                   <tr class="related"><td>related words</td></tr>
                 </table>
               </div></div></ol>
               </div>"#,
        )
        .unwrap();
        assert_eq!(card.title, "crab");
        assert_eq!(card.description, "/krab/");
        assert_eq!(card.fields.len(), 2);
        assert_eq!(card.fields[0].name, "noun");
        assert_eq!(
            card.fields[0].value,
            "1. a crustacean with a broad carapace\n2. a crane for a heavy weight"
        );
        assert_eq!(card.fields[1].name, "verb");
        assert_eq!(card.fields[1].value, "1. move sideways or obliquely");
    }

    #[test]
    fn test_definition_without_info_table_keeps_probing() {
        // A words block without its definition table is not committed to:
        // later patterns still get a look
        let card = parse(
            r#"<div><div id="topstuff"></div>
               <ol>
                 <div class="g"><div>
                   <h3 class="r"><div><span>tokyo</span><span>/toh-kyoh/</span></div></h3>
                 </div></div>
                 <div class="_Tsb _HOb _Qeb">
                   <span class="_HOb _Qeb">Time in Tokyo, Japan</span>
                   <div class="_rkc _Peb">11:22 PM</div>
                   <div class="_HOb _Qeb">Friday, March 3</div>
                 </div>
               </ol>
               </div>"#,
        )
        .unwrap();
        assert_eq!(card.title, "Time in Tokyo, Japan");
        assert_eq!(card.description, "11:22 PM\nFriday, March 3");
    }

    #[test]
    fn test_time_in() {
        let card = parse(
            r#"<div><div id="topstuff"></div>
               <ol><div class="_Tsb _HOb _Qeb">
                 <span class="_HOb _Qeb"> Time in Tokyo, Japan </span>
                 <div class="_rkc _Peb">11:22 PM</div>
                 <div class="_HOb _Qeb">Friday, March 3</div>
               </div></ol>
               </div>"#,
        )
        .unwrap();
        assert_eq!(card.title, "Time in Tokyo, Japan");
        assert_eq!(card.description, "11:22 PM\nFriday, March 3");
    }

    #[test]
    fn test_time_does_not_match_unit_pattern() {
        // class="_Tsb _HOb _Qeb" must not be picked up by the exact
        // class="_Tsb" probe and mislabeled a unit conversion
        let card = parse(
            r#"<div><div id="topstuff"></div>
               <ol><div class="_Tsb _HOb _Qeb">
                 <span class="_HOb _Qeb">Time in Oslo</span>
                 <div class="_rkc _Peb">3:15 PM</div>
                 <div class="_HOb _Qeb">Tuesday</div>
               </div></ol>
               </div>"#,
        )
        .unwrap();
        assert_eq!(card.title, "Time in Oslo");
    }

    #[test]
    fn test_weather() {
        let card = parse(
            r#"<div><div id="topstuff"></div>
               <ol><div class="e">
                 <h3>Weather for Tokyo, Japan</h3>
                 <table>
                   <tr>
                     <td><img alt="Partly Cloudy" src="//ssl.gstatic.com/onebox/weather/48/partly_cloudy.png"></td>
                     <td><span class="wob_t">15°C</span><span class="wob_t">59°F</span></td>
                   </tr>
                   <tr><td>Precipitation: 10%</td></tr>
                   <tr><td>graph</td></tr>
                   <tr><td>Wind: 10 km/h</td></tr>
                   <tr><td>Humidity: 64%</td><td>extra</td></tr>
                 </table>
               </div></ol>
               </div>"#,
        )
        .unwrap();
        assert_eq!(card.title, "Weather for Tokyo, Japan");
        assert_eq!(card.description, "Partly Cloudy");
        assert!(card.italic_description);
        assert_eq!(
            card.thumbnail.as_deref(),
            Some("https://ssl.gstatic.com/onebox/weather/48/partly_cloudy.png")
        );
        assert_eq!(card.fields.len(), 3);
        assert_eq!(card.fields[0].name, "Temperature");
        assert_eq!(card.fields[0].value, "15°C");
        assert_eq!(card.fields[1].name, "Wind");
        assert_eq!(card.fields[1].value, "10 km/h");
        assert_eq!(card.fields[2].name, "Humidity");
        assert_eq!(card.fields[2].value, "64%");
    }

    #[test]
    fn test_weather_missing_table_gives_nothing() {
        let result = parse(
            r#"<div><div id="topstuff"></div>
               <ol><div class="e"><h3>Weather for Nowhere</h3></div></ol>
               </div>"#,
        );
        assert_eq!(result, None);
    }

    #[test]
    fn test_field_cap() {
        let mut card = Card::new("t", "d");
        for i in 0..8 {
            card.add_field(format!("f{i}"), "v");
        }
        assert_eq!(card.fields.len(), MAX_FIELDS);
        assert_eq!(card.fields.last().unwrap().name, "f4");
    }
}
