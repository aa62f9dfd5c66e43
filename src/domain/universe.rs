//! Static stock-universe catalog.
//!
//! A read-only symbol -> name/sector/cap lookup covering the analyzed
//! universe. The scoring pipeline consumes this table; it is never written.

use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockInfo {
    pub symbol: &'static str,
    pub name: &'static str,
    pub sector: &'static str,
    pub cap: &'static str,
}

const CATALOG: &[StockInfo] = &[
    StockInfo { symbol: "RELIANCE", name: "Reliance Industries", sector: "Oil & Gas", cap: "Large" },
    StockInfo { symbol: "TCS", name: "Tata Consultancy Services", sector: "IT", cap: "Large" },
    StockInfo { symbol: "HDFCBANK", name: "HDFC Bank", sector: "Banking", cap: "Large" },
    StockInfo { symbol: "INFY", name: "Infosys", sector: "IT", cap: "Large" },
    StockInfo { symbol: "ICICIBANK", name: "ICICI Bank", sector: "Banking", cap: "Large" },
    StockInfo { symbol: "HINDUNILVR", name: "Hindustan Unilever", sector: "FMCG", cap: "Large" },
    StockInfo { symbol: "SBIN", name: "State Bank of India", sector: "Banking", cap: "Large" },
    StockInfo { symbol: "BHARTIARTL", name: "Bharti Airtel", sector: "Telecom", cap: "Large" },
    StockInfo { symbol: "ITC", name: "ITC Limited", sector: "FMCG", cap: "Large" },
    StockInfo { symbol: "KOTAKBANK", name: "Kotak Mahindra Bank", sector: "Banking", cap: "Large" },
    StockInfo { symbol: "LT", name: "Larsen & Toubro", sector: "Infrastructure", cap: "Large" },
    StockInfo { symbol: "AXISBANK", name: "Axis Bank", sector: "Banking", cap: "Large" },
    StockInfo { symbol: "BAJFINANCE", name: "Bajaj Finance", sector: "Finance", cap: "Large" },
    StockInfo { symbol: "ASIANPAINT", name: "Asian Paints", sector: "Consumer Durables", cap: "Large" },
    StockInfo { symbol: "MARUTI", name: "Maruti Suzuki", sector: "Automobile", cap: "Large" },
    StockInfo { symbol: "TITAN", name: "Titan Company", sector: "Consumer Durables", cap: "Large" },
    StockInfo { symbol: "SUNPHARMA", name: "Sun Pharmaceutical", sector: "Pharma", cap: "Large" },
    StockInfo { symbol: "TATAMOTORS", name: "Tata Motors", sector: "Automobile", cap: "Large" },
    StockInfo { symbol: "ULTRACEMCO", name: "UltraTech Cement", sector: "Cement", cap: "Large" },
    StockInfo { symbol: "WIPRO", name: "Wipro", sector: "IT", cap: "Large" },
    StockInfo { symbol: "ONGC", name: "Oil & Natural Gas Corp", sector: "Oil & Gas", cap: "Large" },
    StockInfo { symbol: "NTPC", name: "NTPC Limited", sector: "Power", cap: "Large" },
    StockInfo { symbol: "POWERGRID", name: "Power Grid Corp", sector: "Power", cap: "Large" },
    StockInfo { symbol: "HCLTECH", name: "HCL Technologies", sector: "IT", cap: "Large" },
    StockInfo { symbol: "TATASTEEL", name: "Tata Steel", sector: "Metals", cap: "Large" },
    StockInfo { symbol: "TECHM", name: "Tech Mahindra", sector: "IT", cap: "Large" },
    StockInfo { symbol: "COALINDIA", name: "Coal India", sector: "Mining", cap: "Large" },
    StockInfo { symbol: "BAJAJFINSV", name: "Bajaj Finserv", sector: "Finance", cap: "Large" },
    StockInfo { symbol: "JSWSTEEL", name: "JSW Steel", sector: "Metals", cap: "Large" },
    StockInfo { symbol: "INDUSINDBK", name: "IndusInd Bank", sector: "Banking", cap: "Large" },
    StockInfo { symbol: "SBILIFE", name: "SBI Life Insurance", sector: "Insurance", cap: "Large" },
    StockInfo { symbol: "HDFCLIFE", name: "HDFC Life Insurance", sector: "Insurance", cap: "Large" },
    StockInfo { symbol: "DIVISLAB", name: "Divi's Laboratories", sector: "Pharma", cap: "Large" },
    StockInfo { symbol: "DRREDDY", name: "Dr. Reddy's Labs", sector: "Pharma", cap: "Large" },
    StockInfo { symbol: "CIPLA", name: "Cipla", sector: "Pharma", cap: "Large" },
    StockInfo { symbol: "BRITANNIA", name: "Britannia Industries", sector: "FMCG", cap: "Large" },
    StockInfo { symbol: "EICHERMOT", name: "Eicher Motors", sector: "Automobile", cap: "Large" },
    StockInfo { symbol: "APOLLOHOSP", name: "Apollo Hospitals", sector: "Healthcare", cap: "Large" },
    StockInfo { symbol: "NESTLEIND", name: "Nestle India", sector: "FMCG", cap: "Large" },
    StockInfo { symbol: "BPCL", name: "Bharat Petroleum", sector: "Oil & Gas", cap: "Large" },
    StockInfo { symbol: "HINDALCO", name: "Hindalco Industries", sector: "Metals", cap: "Large" },
    StockInfo { symbol: "HEROMOTOCO", name: "Hero MotoCorp", sector: "Automobile", cap: "Large" },
    StockInfo { symbol: "TATACONSUM", name: "Tata Consumer Products", sector: "FMCG", cap: "Large" },
    StockInfo { symbol: "LTIM", name: "LTIMindtree", sector: "IT", cap: "Large" },
    StockInfo { symbol: "M&M", name: "Mahindra & Mahindra", sector: "Automobile", cap: "Large" },
    StockInfo { symbol: "ADANIENT", name: "Adani Enterprises", sector: "Infrastructure", cap: "Large" },
    StockInfo { symbol: "ADANIPORTS", name: "Adani Ports", sector: "Infrastructure", cap: "Large" },
    StockInfo { symbol: "GRASIM", name: "Grasim Industries", sector: "Cement", cap: "Large" },
    StockInfo { symbol: "BAJAJ-AUTO", name: "Bajaj Auto", sector: "Automobile", cap: "Large" },
    StockInfo { symbol: "DLF", name: "DLF Limited", sector: "Real Estate", cap: "Large" },
    StockInfo { symbol: "HAVELLS", name: "Havells India", sector: "Consumer Durables", cap: "Large" },
    StockInfo { symbol: "GAIL", name: "GAIL India", sector: "Oil & Gas", cap: "Large" },
    StockInfo { symbol: "MARICO", name: "Marico", sector: "FMCG", cap: "Large" },
    StockInfo { symbol: "PIDILITIND", name: "Pidilite Industries", sector: "Chemicals", cap: "Large" },
    StockInfo { symbol: "BANKBARODA", name: "Bank of Baroda", sector: "Banking", cap: "Large" },
    StockInfo { symbol: "PNB", name: "Punjab National Bank", sector: "Banking", cap: "Large" },
];

#[derive(Debug, Clone, Copy, Default)]
pub struct StockUniverse;

impl StockUniverse {
    pub fn get(&self, symbol: &str) -> Option<&'static StockInfo> {
        CATALOG.iter().find(|s| s.symbol == symbol)
    }

    pub fn sector_of(&self, symbol: &str) -> &'static str {
        self.get(symbol).map(|s| s.sector).unwrap_or("General")
    }

    pub fn name_of(&self, symbol: &str) -> &'static str {
        self.get(symbol).map(|s| s.name).unwrap_or("Unknown")
    }

    pub fn symbols(&self) -> Vec<String> {
        CATALOG.iter().map(|s| s.symbol.to_string()).collect()
    }

    pub fn len(&self) -> usize {
        CATALOG.len()
    }

    pub fn is_empty(&self) -> bool {
        CATALOG.is_empty()
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum SymbolListError {
    #[error("empty token in symbol list")]
    EmptyToken,

    #[error("duplicate symbol: {0}")]
    DuplicateSymbol(String),
}

/// Parse a comma-separated symbol list, upper-casing and rejecting duplicates.
pub fn parse_symbols(input: &str) -> Result<Vec<String>, SymbolListError> {
    let mut symbols = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(SymbolListError::EmptyToken);
        }
        let symbol = trimmed.to_uppercase();
        if !seen.insert(symbol.clone()) {
            return Err(SymbolListError::DuplicateSymbol(symbol));
        }
        symbols.push(symbol);
    }

    Ok(symbols)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_lookup() {
        let universe = StockUniverse;
        let info = universe.get("TCS").unwrap();
        assert_eq!(info.name, "Tata Consultancy Services");
        assert_eq!(info.sector, "IT");
    }

    #[test]
    fn unknown_symbol_defaults() {
        let universe = StockUniverse;
        assert!(universe.get("NOPE").is_none());
        assert_eq!(universe.sector_of("NOPE"), "General");
        assert_eq!(universe.name_of("NOPE"), "Unknown");
    }

    #[test]
    fn catalog_has_no_duplicates() {
        let universe = StockUniverse;
        let symbols = universe.symbols();
        let unique: HashSet<_> = symbols.iter().collect();
        assert_eq!(unique.len(), symbols.len());
    }

    #[test]
    fn parse_symbols_uppercases() {
        let symbols = parse_symbols("infy, tcs ,Reliance").unwrap();
        assert_eq!(symbols, vec!["INFY", "TCS", "RELIANCE"]);
    }

    #[test]
    fn parse_symbols_rejects_empty_token() {
        assert!(matches!(
            parse_symbols("INFY,,TCS"),
            Err(SymbolListError::EmptyToken)
        ));
    }

    #[test]
    fn parse_symbols_rejects_duplicates() {
        assert!(matches!(
            parse_symbols("INFY,infy"),
            Err(SymbolListError::DuplicateSymbol(_))
        ));
    }
}
