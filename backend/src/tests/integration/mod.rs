mod api_export;
mod api_opportunities;
mod postgres;
