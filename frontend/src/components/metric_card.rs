use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct MetricCardProps {
    pub title: String,
    pub value: String,
    pub icon: String,
    pub color: String,
}

#[function_component(MetricCard)]
pub fn metric_card(props: &MetricCardProps) -> Html {
    let (bg_color, text_color) = match props.color.as_str() {
        "blue" => ("bg-blue-600", "text-blue-400"),
        "green" => ("bg-green-600", "text-green-400"),
        "yellow" => ("bg-yellow-600", "text-yellow-400"),
        "purple" => ("bg-purple-600", "text-purple-400"),
        _ => ("bg-gray-600", "text-gray-400"),
    };

    let icon = match props.icon.as_str() {
        "list" => html! {
            <svg class="w-6 h-6" fill="none" stroke="currentColor" viewBox="0 0 24 24">
                <path stroke-linecap="round" stroke-linejoin="round" stroke-width="2" d="M4 6h16M4 12h16M4 18h16"/>
            </svg>
        },
        "dollar" => html! {
            <svg class="w-6 h-6" fill="none" stroke="currentColor" viewBox="0 0 24 24">
                <path stroke-linecap="round" stroke-linejoin="round" stroke-width="2" d="M12 8c-1.657 0-3 .895-3 2s1.343 2 3 2 3 .895 3 2-1.343 2-3 2m0-8c1.11 0 2.08.402 2.599 1M12 8V7m0 1v8m0 0v1m0-1c-1.11 0-2.08-.402-2.599-1M21 12a9 9 0 11-18 0 9 9 0 0118 0z"/>
            </svg>
        },
        "target" => html! {
            <svg class="w-6 h-6" fill="none" stroke="currentColor" viewBox="0 0 24 24">
                <path stroke-linecap="round" stroke-linejoin="round" stroke-width="2" d="M9 12l2 2 4-4m6 2a9 9 0 11-18 0 9 9 0 0118 0z"/>
            </svg>
        },
        "ticket" => html! {
            <svg class="w-6 h-6" fill="none" stroke="currentColor" viewBox="0 0 24 24">
                <path stroke-linecap="round" stroke-linejoin="round" stroke-width="2" d="M15 5v2m0 4v2m0 4v2M5 5a2 2 0 00-2 2v3a2 2 0 110 4v3a2 2 0 002 2h14a2 2 0 002-2v-3a2 2 0 110-4V7a2 2 0 00-2-2H5z"/>
            </svg>
        },
        _ => html! { <span class="w-6 h-6"></span> },
    };

    html! {
        <div class="bg-gray-800 rounded-lg border border-gray-700 p-4">
            <div class={format!("inline-block p-2 rounded-lg {}", bg_color)}>
                <div class="text-white">
                    {icon}
                </div>
            </div>
            <div class="mt-3">
                <p class="text-2xl font-bold text-white">{&props.value}</p>
                <p class={format!("text-sm {}", text_color)}>{&props.title}</p>
            </div>
        </div>
    }
}
